mod common;
mod generator;
