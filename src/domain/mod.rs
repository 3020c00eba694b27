mod submission;
mod subscriber_email;

pub use submission::{
    SubmissionError, SubmissionPayload, ValidSubmission, compute_signature,
};
pub use subscriber_email::SubscriberEmail;
