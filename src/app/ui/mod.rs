mod panels;
mod search;
mod transactions;

pub(super) use search::SearchForm;
