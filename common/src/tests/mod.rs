mod status_code;
