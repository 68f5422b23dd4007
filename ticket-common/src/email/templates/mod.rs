use std::time::Duration;

/// Each template returns an `(html, plaintext)` body pair.
pub struct OtpMessage {}

impl OtpMessage {
    pub fn generate(otp: &str, otp_lifetime: Duration) -> (String, String) {
        let minutes = otp_lifetime.as_secs() / 60;

        let html = format!(
            "<html>
               <head>
                 <style>
                   body {{
                     font-family: Arial, sans-serif;
                     text-align: center;
                   }}
                 </style>
               </head>
             <body>
               <h1>Your verification code</h1>
               <h2 style=\"font-family: 'Courier New', monospace; user-select: all;
               -webkit-user-select: all;\"><b>{}</b></h2>
               <p>We will never ask you for this code over the phone or email.
               <b>Your code expires in {} minutes.</b></p>
             </body>
             </html>",
            otp, minutes,
        );

        let text = format!(
            "Your verification code is {}. It expires in {} minutes. \
             We will never ask you for this code over the phone or email.",
            otp, minutes,
        );

        (html, text)
    }
}

pub struct TicketReceivedMessage {}

impl TicketReceivedMessage {
    pub fn generate(
        requester_name: &str,
        ticket_reference: &str,
        ticket_type: &str,
        subject: &str,
    ) -> (String, String) {
        let html = format!(
            "<html>
               <head>
                 <style>
                   body {{
                     font-family: Arial, sans-serif;
                   }}
                 </style>
               </head>
             <body>
               <h1>We have received your {}</h1>
               <p>Hello {},</p>
               <p>Your {} <b>{}</b> (&ldquo;{}&rdquo;) has been logged and is
               awaiting assignment to an engineer. You will be notified when an
               engineer takes it on.</p>
             </body>
             </html>",
            ticket_type, requester_name, ticket_type, ticket_reference, subject,
        );

        let text = format!(
            "Hello {}, your {} {} (\"{}\") has been logged and is awaiting \
             assignment to an engineer. You will be notified when an engineer \
             takes it on.",
            requester_name, ticket_type, ticket_reference, subject,
        );

        (html, text)
    }
}

pub struct TicketAssignedMessage {}

impl TicketAssignedMessage {
    pub fn generate(
        requester_name: &str,
        ticket_reference: &str,
        engineer_name: &str,
        engineer_contact: &str,
    ) -> (String, String) {
        let html = format!(
            "<html>
               <head>
                 <style>
                   body {{
                     font-family: Arial, sans-serif;
                   }}
                 </style>
               </head>
             <body>
               <h1>An engineer is on your ticket</h1>
               <p>Hello {},</p>
               <p>Your ticket <b>{}</b> has been assigned to <b>{}</b>
               ({}). They will be in touch shortly.</p>
             </body>
             </html>",
            requester_name, ticket_reference, engineer_name, engineer_contact,
        );

        let text = format!(
            "Hello {}, your ticket {} has been assigned to {} ({}). They will \
             be in touch shortly.",
            requester_name, ticket_reference, engineer_name, engineer_contact,
        );

        (html, text)
    }
}

/// Sent to the shared engineer-pool address when a new ticket arrives.
pub struct NewTicketAlertMessage {}

impl NewTicketAlertMessage {
    pub fn generate(
        ticket_reference: &str,
        ticket_type: &str,
        subject: &str,
        priority: &str,
    ) -> (String, String) {
        let html = format!(
            "<html>
               <head>
                 <style>
                   body {{
                     font-family: Arial, sans-serif;
                   }}
                 </style>
               </head>
             <body>
               <h1>New {} awaiting assignment</h1>
               <p>Ticket <b>{}</b> (&ldquo;{}&rdquo;) was just filed with
               <b>{}</b> priority.</p>
             </body>
             </html>",
            ticket_type, ticket_reference, subject, priority,
        );

        let text = format!(
            "New {} awaiting assignment: ticket {} (\"{}\") was just filed \
             with {} priority.",
            ticket_type, ticket_reference, subject, priority,
        );

        (html, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_message_mentions_code_and_lifetime() {
        let (html, text) = OtpMessage::generate("481263", Duration::from_secs(300));

        assert!(html.contains("481263"));
        assert!(html.contains("5 minutes"));
        assert!(text.contains("481263"));
        assert!(text.contains("5 minutes"));
    }

    #[test]
    fn test_ticket_templates_mention_reference() {
        let (html, text) = TicketReceivedMessage::generate(
            "Nimal",
            "#000123",
            "Service Request",
            "Printer out of toner",
        );
        assert!(html.contains("#000123"));
        assert!(text.contains("#000123"));

        let (html, text) =
            TicketAssignedMessage::generate("Nimal", "#000123", "Kumari", "0771234567");
        assert!(html.contains("Kumari"));
        assert!(text.contains("0771234567"));

        let (html, text) =
            NewTicketAlertMessage::generate("#000124", "Faulty Ticket", "Router down", "High");
        assert!(html.contains("High"));
        assert!(text.contains("#000124"));
    }
}
