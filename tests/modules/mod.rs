mod builder;
mod stream;
