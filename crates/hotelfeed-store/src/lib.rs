//! Document store backends for hotel records

pub mod mongo;

pub use mongo::MongoSink;
