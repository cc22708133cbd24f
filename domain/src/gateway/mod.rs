pub mod esign;
