pub(crate) mod scheduler;
pub(crate) mod scratch;
pub(crate) mod shared;
pub(crate) mod work_item;
