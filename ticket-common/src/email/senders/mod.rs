mod mock_sender;
mod smtp_sender;

pub use mock_sender::MockSender;
pub use smtp_sender::SmtpSender;
