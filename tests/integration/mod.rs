mod concurrency;
mod healing_flow;
