mod mem_kv_client;


pub use mem_kv_client::*;
