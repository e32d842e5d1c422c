use serenity::all::{Colour, CreateEmbed};

/// Success color - Emerald green
pub const SUCCESS_COLOR: Colour = Colour::from_rgb(16, 185, 129);

/// Error color - Rose red
pub const ERROR_COLOR: Colour = Colour::from_rgb(244, 63, 94);

/// Warning/escalation color - Amber
pub const WARNING_COLOR: Colour = Colour::from_rgb(245, 158, 11);

/// Neutral/informational color - Blurple
pub const INFO_COLOR: Colour = Colour::from_rgb(88, 101, 242);

/// Suggestion color - Gold
pub const SUGGESTION_COLOR: Colour = Colour::from_rgb(234, 179, 8);

pub fn success_embed() -> CreateEmbed {
    CreateEmbed::new().colour(SUCCESS_COLOR)
}

pub fn error_embed() -> CreateEmbed {
    CreateEmbed::new().colour(ERROR_COLOR)
}

pub fn warning_embed() -> CreateEmbed {
    CreateEmbed::new().colour(WARNING_COLOR)
}

pub fn info_embed() -> CreateEmbed {
    CreateEmbed::new().colour(INFO_COLOR)
}
