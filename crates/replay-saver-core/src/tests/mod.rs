mod guard;
mod mock;
mod operation;
mod session;
