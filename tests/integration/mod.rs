mod persistence_flow;
