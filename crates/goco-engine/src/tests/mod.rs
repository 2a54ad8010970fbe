mod context_tests;
mod member_tests;
mod suggest_tests;
