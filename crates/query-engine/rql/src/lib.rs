pub mod rql;
