//! Recognition of legacy auto-generated chat messages.
//!
//! Early accounts received welcome and ICO messages whose text was an i18n
//! key rather than prose. Only these fixed senders ever sent them, so a
//! key is recognised only when it comes from its sender.

/// Sender of the welcome message.
pub const WELCOME_SENDER: &str = "U15423595369615486571";

/// Sender of the pre-ICO and ICO messages.
pub const ICO_SENDER: &str = "U7047165086065693428";

/// (substring, required sender, resulting key)
const LEGACY_MESSAGES: [(&str, &str, &str); 3] = [
    ("chats.welcome_message", WELCOME_SENDER, "chats.welcome_message"),
    ("chats.preico_message", ICO_SENDER, "chats.ico_message"),
    ("chats.ico_message", ICO_SENDER, "chats.ico_message"),
];

/// Returns the i18n key if `message` is a legacy auto-message from `sender_id`.
pub fn legacy_i18n_key(message: &str, sender_id: &str) -> Option<&'static str> {
    LEGACY_MESSAGES
        .iter()
        .find(|(needle, sender, _)| sender_id == *sender && message.contains(needle))
        .map(|(_, _, key)| *key)
}
