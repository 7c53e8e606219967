use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlangError {
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokenizer error on line {line}: {message}")]
    Scan { line: usize, message: String },

    #[error("Parser error on '{token}': '{message}'")]
    Parse { token: String, message: String },

    #[error("Cannot read variable '{ident}' in its own initializer.")]
    Initializer { ident: String },

    #[error("TypeError: '{message}'.")]
    Type { message: String },

    #[error("Undefined variable '{ident}'.")]
    UndefinedVariable { ident: String },

    #[error("Variable '{ident}' already defined.")]
    AlreadyDefined { ident: String },

    #[error("{name} requires {expected} arguments, got {got}.")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    // Both of these mean a bug in the pipeline itself, not in the script.
    #[error("WE MESSED UP BIG TIME")]
    Unreachable,

    #[error("WE MESSED UP BIG TIME")]
    Scope { depth: usize },
}
