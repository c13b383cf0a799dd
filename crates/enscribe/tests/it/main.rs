mod executor;
mod mock;
mod run;
