pub mod tuition;
