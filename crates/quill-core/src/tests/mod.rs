mod scope_tests;
mod stack_tests;
mod typing_tests;
