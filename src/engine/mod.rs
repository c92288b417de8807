//! The survey engine: deciding whether a submission is acceptable, and turning
//! answer history into per-answer statistics.
//!
//! Everything in here is a pure computation over data already fetched from the
//! database. Nothing here performs I/O, and the only notion of time comes from
//! an injected [`Clock`].

mod aggregator;
mod clock;
mod history;
mod validator;

pub use aggregator::{
    aggregate, AnswerHeader, AnswerResult, QuestionHeader, QuestionResult, SurveyHeader,
    SurveyResult,
};
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use history::{AnswerWithHistory, QuestionWithHistory, SurveyWithHistory};
pub use validator::{Accepted, Rejection, RejectionKind, SubmissionValidator};
