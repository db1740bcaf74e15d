use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown mode '{0}', expected 'schema' or 'call'")]
pub struct UnknownMode(String);

/// What the `compose` binary does with the composed router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Print the procedure names of every category.
    #[default]
    Schema,
    /// Run a short scripted session against the router in-process.
    Call,
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "schema" => Ok(Mode::Schema),
            "call" => Ok(Mode::Call),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!("schema".parse::<Mode>().unwrap(), Mode::Schema);
        assert_eq!(" CALL ".parse::<Mode>().unwrap(), Mode::Call);
        assert_eq!(Mode::default(), Mode::Schema);
    }

    #[test]
    fn test_unknown_mode() {
        let err = "serve".parse::<Mode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown mode 'serve', expected 'schema' or 'call'");
    }
}
