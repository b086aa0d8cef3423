mod dispatch_tests;
mod effect_tests;
