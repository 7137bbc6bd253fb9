pub mod alert;
pub mod button;
pub mod card;
pub mod input;
pub mod spinner;

pub use alert::*;
pub use button::*;
pub use card::*;
pub use input::*;
pub use spinner::*;
