//! RFC 5322 message parsing.
//!
//! Thin wrapper over `mail_parser` that extracts exactly what the sync
//! pipeline needs from the raw payload: the text and HTML bodies and the
//! attachment parts. Header fields come from the IMAP envelope instead.
//! A payload that cannot be parsed yields `None` and the caller falls
//! back to a placeholder body.

use mail_parser::{MessageParser, MimeHeaders};

/// Body and attachment content of one message.
#[derive(Debug, Clone, Default)]
pub struct ParsedMail {
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub attachments: Vec<ParsedAttachment>,
}

/// One attachment part, inline or regular.
#[derive(Debug, Clone)]
pub struct ParsedAttachment {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub content_id: Option<String>,
    pub data: Vec<u8>,
}

/// Parses a raw message. Returns `None` when the payload is not a
/// recognizable message at all.
pub fn parse(raw: &[u8]) -> Option<ParsedMail> {
    let message = MessageParser::default().parse(raw)?;

    let body_text = message.body_text(0).map(|s| s.to_string());
    let body_html = message.body_html(0).map(|s| s.to_string());

    let attachments = message
        .attachments()
        .map(|part| ParsedAttachment {
            filename: part.attachment_name().map(str::to_string),
            content_type: part.content_type().map(|ct| match ct.subtype() {
                Some(sub) => format!("{}/{}", ct.ctype(), sub),
                None => ct.ctype().to_string(),
            }),
            content_id: part.content_id().map(str::to_string),
            data: part.contents().to_vec(),
        })
        .collect();

    Some(ParsedMail {
        body_text,
        body_html,
        attachments,
    })
}
