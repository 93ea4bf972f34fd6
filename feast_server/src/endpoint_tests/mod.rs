mod helpers;
mod mocks;

mod flow;
mod orders;
mod settlement;
