mod common;
mod documents;
mod forms;
mod schemas;
