mod test_payload;
