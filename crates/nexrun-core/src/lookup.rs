// ── Tagged lookup results ──
//
// Listing endpoints can fail in two different ways (the request failed,
// or the body could not be read) and can legitimately find nothing.
// `Lookup` keeps the three cases apart; `found()` collapses them for
// callers that only care whether an id came back.

use tracing::warn;

/// Why a lookup produced no answer.
#[derive(Debug)]
pub enum LookupFailure {
    /// Connection failure or a status outside the accepted set.
    Transport(nexrun_api::Error),
    /// The console answered but the body did not decode.
    Parse(nexrun_api::Error),
}

impl LookupFailure {
    pub fn error(&self) -> &nexrun_api::Error {
        match self {
            Self::Transport(e) | Self::Parse(e) => e,
        }
    }

    pub fn into_error(self) -> nexrun_api::Error {
        match self {
            Self::Transport(e) | Self::Parse(e) => e,
        }
    }
}

impl From<nexrun_api::Error> for LookupFailure {
    fn from(err: nexrun_api::Error) -> Self {
        if err.is_parse() {
            Self::Parse(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// Outcome of searching a remote collection.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(LookupFailure),
}

impl<T> Lookup<T> {
    /// Build from a listing result and the match found in it.
    pub fn from_result(result: Result<Option<T>, nexrun_api::Error>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::NotFound,
            Err(e) => Self::Failed(e.into()),
        }
    }

    /// Collapsed view: the value if found, `None` for not-found *and*
    /// for every failure. Failures are logged before they are dropped.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
            Self::Failed(failure) => {
                warn!(error = %failure.error(), "lookup failed");
                None
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::Failed(failure) => Lookup::Failed(failure),
        }
    }

    /// Strict view: failures become errors, not-found stays `None`.
    pub fn into_result(self) -> Result<Option<T>, nexrun_api::Error> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::NotFound => Ok(None),
            Self::Failed(failure) => Err(failure.into_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_view_hides_failure_kind() {
        let missing: Lookup<i64> = Lookup::from_result(Ok(None));
        let malformed: Lookup<i64> = Lookup::from_result(Err(nexrun_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }));
        let refused: Lookup<i64> = Lookup::from_result(Err(nexrun_api::Error::Api {
            status: 500,
            message: "boom".into(),
        }));

        assert!(matches!(malformed, Lookup::Failed(LookupFailure::Parse(_))));
        assert!(matches!(refused, Lookup::Failed(LookupFailure::Transport(_))));

        assert_eq!(missing.found(), None);
        assert_eq!(malformed.found(), None);
        assert_eq!(refused.found(), None);
    }

    #[test]
    fn map_preserves_tags() {
        let found = Lookup::Found(3).map(|n| n * 2);
        assert!(matches!(found, Lookup::Found(6)));
        assert!(Lookup::<i64>::NotFound.map(|n| n + 1).into_result().is_ok());
    }
}
