mod token;

pub use token::Token;
pub use token::TokenManager;
