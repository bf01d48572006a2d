pub(crate) mod access_policy;
pub(crate) mod export;
pub(crate) mod question_query;
pub(crate) mod storage;
