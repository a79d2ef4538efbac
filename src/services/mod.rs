pub mod notifications;
pub mod sequence;
pub mod transitions;
pub mod work_orders;
