pub mod chart;
pub mod cli;
pub mod condition;
pub mod config_file;
pub mod ctx;
pub mod get_terminal_width;
pub mod io_utils;
pub mod name_filter;
pub mod pooling;
pub mod report;
pub mod series;
pub mod stat_file;
pub mod stat_file_naming;
pub mod terminal_table;
pub mod utillib;
