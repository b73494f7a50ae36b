mod label;
mod locale;

pub use self::label::{Label, LabelId};
pub use self::locale::Locale;
