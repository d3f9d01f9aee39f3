//! Application handlers.
//!
//! Command handlers that turn caller input into orchestration runs.

mod answer_question;

pub use answer_question::{
    AnswerQuestionCommand, AnswerQuestionError, AnswerQuestionHandler,
};
