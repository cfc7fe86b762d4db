mod file_sync;
mod merge_properties;
