pub mod cloud;
pub mod directory;
pub mod excel_read;
pub mod excel_write;
