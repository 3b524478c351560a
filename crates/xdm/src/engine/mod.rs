pub mod arithmetic;
pub mod casting;
pub mod runtime;
