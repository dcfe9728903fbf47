mod level_list;
mod script;

pub use level_list::{
    save_level_list, write_json, write_level_list, write_load_plan, LEVEL_LIST_HEADER,
    LOAD_PLAN_HEADER,
};
pub use script::{render_scripts, save_lines, write_lines, PLACEHOLDERS};
