pub mod client;
pub mod trpc;

use crate::error::RemoteError;
use crate::models::{NewQuestion, Question};
use crate::search::QuestionQuery;

pub const FILTER_PROCEDURE: &str = "questions.questions.getQuestionsByFilter";
pub const CREATE_PROCEDURE: &str = "questions.questions.create";

/// The question catalog API as seen by the browse page.
pub trait QuestionService {
    /// Questions matching the filter, in server order.
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, RemoteError>;

    /// Submit a contributed question.
    fn create_question(&self, question: &NewQuestion) -> Result<(), RemoteError>;
}

impl<S: QuestionService + ?Sized> QuestionService for &S {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, RemoteError> {
        (**self).fetch_questions(query)
    }

    fn create_question(&self, question: &NewQuestion) -> Result<(), RemoteError> {
        (**self).create_question(question)
    }
}

impl<S: QuestionService + ?Sized> QuestionService for Box<S> {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, RemoteError> {
        (**self).fetch_questions(query)
    }

    fn create_question(&self, question: &NewQuestion) -> Result<(), RemoteError> {
        (**self).create_question(question)
    }
}
