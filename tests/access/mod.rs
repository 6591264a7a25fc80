mod evaluator;
mod server;
mod tokens;
