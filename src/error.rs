use thiserror::Error;

/// Failures that abort projection of a single card, and with it the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("card {card_id}: list {list_id} is not on the board")]
    UnknownList { card_id: String, list_id: String },
    #[error("card {card_id}: member {member_id} is not on the board")]
    UnknownMember { card_id: String, member_id: String },
    #[error("card {card_id}: malformed comment timestamp {value:?}")]
    CommentDate { card_id: String, value: String },
}
