mod codec;
mod command;
mod device_info;
mod event;
mod json_fields;
mod wake;
