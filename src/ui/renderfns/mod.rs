pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{
  cache_age, centered_popup, format_price, input_line, order_status_color, stock_color,
  top_left_popup, truncate,
};
