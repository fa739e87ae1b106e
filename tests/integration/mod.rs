mod filesystem_tests;
mod metadata_tests;
mod mutation_tests;
