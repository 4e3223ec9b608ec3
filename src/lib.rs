pub mod compiler;
pub mod dsl;
pub mod editor;
pub mod environment;
pub mod ir;
