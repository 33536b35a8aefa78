mod aggregates;
mod helpers;
mod startup;
