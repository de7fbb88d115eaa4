pub mod reading_queries;

pub use reading_queries::{
    delete_reading, insert_reading, list_readings, update_reading, StoreError,
};
