use trading_core::Signal;

/// Map free-form alert text onto a directional signal.
///
/// Exit wording wins over entry wording so phrases like "Exit long" close
/// rather than open.
pub fn parse_signal_message(message: &str) -> Option<Signal> {
    let lower = message.to_lowercase();

    if ["exit", "sell", "close"].iter().any(|kw| lower.contains(kw)) {
        return Some(Signal::Sell);
    }
    if ["entry", "buy", "long"].iter().any(|kw| lower.contains(kw)) {
        return Some(Signal::Buy);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_entry_wording() {
        for message in [
            "Accepted Entry BTCUSDT 1m",
            "BUY",
            "buy now",
            "Go LONG here",
        ] {
            assert_eq!(parse_signal_message(message), Some(Signal::Buy), "{message}");
        }
    }

    #[test]
    fn recognizes_exit_wording() {
        for message in [
            "Accepted Exit BTCUSDT 1m",
            "SELL",
            "close position",
            "Exit long",
        ] {
            assert_eq!(
                parse_signal_message(message),
                Some(Signal::Sell),
                "{message}"
            );
        }
    }

    #[test]
    fn unknown_text_maps_to_nothing() {
        assert_eq!(parse_signal_message(""), None);
        assert_eq!(parse_signal_message("hello world"), None);
        assert_eq!(parse_signal_message("HOLD"), None);
    }
}
