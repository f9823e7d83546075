/// Log entry into a grammar production together with the lookahead token.
macro_rules! trace_production {
    ($parser:expr, $production:expr) => {
        log::trace!(
            "parsing {} at {}: next is {}",
            $production,
            $parser.current.location,
            $parser.current
        );
    };
}

pub(crate) use trace_production;
