//! Listing helpers for the dashboard views: date ranges, page windows, bike
//! filters, user search and statistics, activity classification and
//! navigation.

pub mod activity;
pub mod bikes;
pub mod date_range;
pub mod menu;
pub mod paging;
pub mod users;

pub use activity::{ActionKind, annotate_activities};
pub use bikes::{BIKES_PER_PAGE, BikeFilter, BikePage, bike_page};
pub use date_range::DateRangeFilter;
pub use menu::{BRANDS, Brand, SidebarItem, sidebar_for};
pub use paging::{parse_positive, visible_pages};
pub use users::{UserStatistics, records, search_users, user_statistics};
