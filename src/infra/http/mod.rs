pub mod http_request_submitter;
